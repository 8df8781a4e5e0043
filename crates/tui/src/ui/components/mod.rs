pub mod hints;
pub mod page;
pub mod tabs;
pub mod toast;
