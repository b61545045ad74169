//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a start of an entity.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing an end of an entity.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type describing an entity update.
#[derive(Clone, Copy, Debug)]
pub struct Update;
