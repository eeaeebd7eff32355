//! Terminal renditions of two journalist-death visualizations: a
//! multi-series line chart and a spike/choropleth world map with a year
//! slider, both drawn with Braille characters.

pub mod anim;
pub mod app;
pub mod braille;
pub mod chart;
pub mod color;
pub mod config;
pub mod data;
pub mod map;
pub mod slider;
pub mod tooltip;
pub mod ui;
