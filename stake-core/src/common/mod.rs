/// Block time in seconds since the epoch (as reported by the consensus engine)
pub type Timespec = u64;
