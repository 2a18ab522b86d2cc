//! 业务逻辑服务模块
//!
//! 封装数据采集、存储和分析逻辑

pub mod analytics; // 价格分析
pub mod common;    // 公共常量
pub mod parser;    // Nasdaq 数据采集
pub mod store;     // 关系型存储
