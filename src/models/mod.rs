mod caller;
mod order;
mod product;

pub use caller::*;
pub use order::*;
pub use product::*;
