mod block;
mod dominant;

pub use block::BlockSize;
pub use dominant::pixelate;
