pub mod memory;
pub mod moex;
pub mod source;
pub mod store;
pub mod synthetic;

pub use memory::MemorySource;
#[cfg(feature = "moex-source")]
pub use moex::MoexSource;
pub use moex::parse_history;
pub use source::MarketDataSource;
pub use store::{CapacityLimit, EvictionPolicy, RetainAll, SeriesStore};
pub use synthetic::SyntheticSource;
