// -
// Database namespaces

/// Sled database tree namespaces
pub(crate) const RECORDS_TREE: &str = "_records";
pub(crate) const CHILDREN_TREE: &str = "_children";
pub(crate) const TOMBSTONES_TREE: &str = "_tombstones";

/// Name of the process-wide default graph
pub const DEFAULT_GRAPH_NAME: &str = "default";

/// Environment variable prefix for config overrides, e.g. `WATCHGRAPH__STORAGE__TEMPORARY`
pub(crate) const CONFIG_ENV_PREFIX: &str = "WATCHGRAPH";

/// Predicate keys
pub(crate) const TYPE_KEY: &str = "type";
pub(crate) const NAME_KEY: &str = "name";
