pub mod input_handle;
pub mod view_handle;
