mod method_prober;

pub use method_prober::{MethodProber, ProbeSettings};
