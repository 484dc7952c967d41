pub mod cloudinary;
pub mod replicate;
