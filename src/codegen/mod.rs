pub mod html;
pub mod markup;
