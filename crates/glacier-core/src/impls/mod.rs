//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **AwsGlacierService**: 本番用（aws-sdk-glacier）
//! - **InMemoryGlacier**: テスト・デモ用

pub mod aws;
pub mod in_memory;

pub use self::aws::AwsGlacierService;
pub use self::in_memory::{Call, InMemoryGlacier};
