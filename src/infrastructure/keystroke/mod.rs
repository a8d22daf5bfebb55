//! Keystroke injection adapters

pub mod ydotool;

pub use ydotool::YdotoolInjector;
