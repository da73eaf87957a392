/// Feature preparation for the risk classifier.
///
/// Submodules:
/// - `features`: builds the classifier's input vector from a coordinate
///   and its observations, including the missing-value policy.

pub mod features;
