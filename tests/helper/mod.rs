#![allow(dead_code)]

pub mod _store_helper;
