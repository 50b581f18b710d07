use std::thread::sleep;

use crate::utils::time::get_now_as_millis;

#[test]
fn test_get_now_as_millis() {
    let t1 = get_now_as_millis();
    sleep(std::time::Duration::from_millis(10));
    let t2 = get_now_as_millis();

    // Ensure time is moving forward
    assert!(t2 > t1);
    // Greater than 2021-01-01
    assert!(t1 > 1_609_459_200_000);
}
