pub mod occurrences;
pub mod status;
pub mod sync;
pub mod venue;
