pub mod matrix;
pub mod sl2;
pub mod tensor;
pub mod zq;

pub use matrix::Matrix;
pub use sl2::Sl2;
pub use tensor::Tensor3;
