mod block;
mod genesis;
mod receipt;
mod transaction;

pub use block::*;
pub use genesis::*;
pub use receipt::*;
pub use transaction::*;
