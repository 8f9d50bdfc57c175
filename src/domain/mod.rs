pub mod answer;
pub mod combination;
pub mod ports;
pub mod rowspan;
pub mod validation;
