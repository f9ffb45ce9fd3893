// This file has code from https://github.com/LIHPC-Computational-Geometry/coupe
pub mod algorithms;
pub mod assignment;
pub mod graph;
pub mod imbalance;
pub mod io;
pub mod random;
pub mod topology;

// The `Partition` trait allows for partitioning data.
// Partitioning algorithms implement this trait.
// The generic argument `M` defines the input of the algorithms (here a
// graph together with its vertex weights).
// The input partition must be of the correct size. Its contents are only
// overwritten when the algorithm succeeds.
pub trait Partition<M> {
    // Diagnostic data returned for a specific run of the algorithm.
    type Metadata;

    // Error details, should the algorithm fail to run.
    type Error;

    // Partition the given data and output the part ID of each element in
    // `part_ids`.
    //
    // Part IDs are contiguous and start from zero. A part that received no
    // element is empty.
    fn partition(&mut self, part_ids: &mut [usize], data: M)
                 -> Result<Self::Metadata, Self::Error>;
}
