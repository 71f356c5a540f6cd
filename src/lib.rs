//! Road Traffic Engine
//!
//! A tick-driven, multi-lane tile-road vehicle simulation that can run
//! independently of any renderer or game loop.

pub mod simulation;
