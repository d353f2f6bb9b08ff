//! Common test utilities: an in-test deparser and parse result fixtures

#[allow(unused_imports)]
pub mod deparser;
#[allow(unused_imports)]
pub mod fixtures;

#[allow(unused_imports)]
pub use deparser::*;
#[allow(unused_imports)]
pub use fixtures::*;
