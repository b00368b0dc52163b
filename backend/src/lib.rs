//! Engine behind the "Tabelas de Parcelamentos" screens: payment-plan
//! templates for courses, with per-installment derivation, slot allocation,
//! a discount ceiling gate, the flat bracket-indexed wire codec, and the
//! REST surface the persistence layer speaks.

pub mod domain;
pub mod rest;
pub mod storage;
pub mod wire;
