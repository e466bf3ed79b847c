/// Rendering: selection panel and top bar in `panels`, dashboard page in `plot`.
pub mod panels;
pub mod plot;
