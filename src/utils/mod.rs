pub(crate) mod time;

#[cfg(test)]
mod time_test;
