// 图片缩放后端库
//
// 本库提供远程图片缩放服务的核心功能，包括：
// - API 路由
// - 服务配置
// - 请求与结果模型
// - 抓取、缩放、缓存流水线

pub mod api;
pub mod config;
pub mod models;
pub mod services;
