mod batch;
mod pair;
pub mod shared;

pub use batch::batch;
pub use pair::pair;
