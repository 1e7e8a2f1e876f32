pub mod chart;
pub mod controls;
pub mod debug;
pub mod legend;
pub mod query_form;
pub mod text_input;
