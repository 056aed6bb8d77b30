pub mod decide;
pub mod discovery;
pub mod identity;
pub mod invocation;
pub mod launch;
pub mod node;
pub mod probe;
pub mod state;
pub mod storage;
