pub mod lis3mdl;
pub mod lsm6ds3;
