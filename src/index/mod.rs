pub mod indexer;
pub mod record;
pub mod scan;
pub mod store;


pub use self::indexer::*;
pub use self::record::*;
pub use self::scan::*;
pub use self::store::*;
