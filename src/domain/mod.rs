// Domain layer: 核心資料模型與外部服務介面 (ports)

pub mod model;
pub mod ports;
