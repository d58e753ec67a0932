// Application layer: pipelines composed from core algorithms and domain ports.

pub mod pipelines;
