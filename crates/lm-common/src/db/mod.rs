pub mod candidates;
pub mod pool;
pub mod similarity;
pub mod util;

pub use candidates::PgCandidateStore;
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
pub use similarity::{PgSimilarityIndex, RpcTarget};
