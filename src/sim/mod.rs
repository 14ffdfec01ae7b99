//! 理论推演模块：在卡池中随机抽取对手，评估某个组合的表现。

pub mod theorycraft;

pub use theorycraft::{SimulationDepth, TheorycraftConfig, TheorycraftReport, Theorycrafter};
