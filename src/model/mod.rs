/// Shared data contracts for the forensic pipeline.
///
/// Every type here is a flat struct (or a tagged-union enum at parsing
/// boundaries) that crosses a component seam named in the design: RPC
/// responses, Event Store rows, and the ephemeral reports composed by
/// `analyze(mint)`. All are `Serialize + Deserialize` so they round-trip
/// through `extra_json` blobs and the API surface unchanged.
pub mod token;
pub mod events;
pub mod flow;
pub mod cartel;
pub mod bundle;
pub mod lineage;
pub mod rpc;

pub use token::*;
pub use events::*;
pub use flow::*;
pub use cartel::*;
pub use bundle::*;
pub use lineage::*;
pub use rpc::*;
