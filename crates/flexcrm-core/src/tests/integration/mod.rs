#![cfg(test)]

pub mod common;
pub mod lifecycle;
pub mod storage;
