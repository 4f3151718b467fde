// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::sync::Arc;

use crate::{ComputeResource, ComputeResourceBuilder};

/// The resource that tests compute expected timings against.
///
/// The default resource with eight memory channels.
#[must_use]
pub fn reference_resource() -> Arc<ComputeResource> {
    let resource = ComputeResourceBuilder::new("reference")
        .memory_channels(8.0)
        .build()
        .unwrap();
    Arc::new(resource)
}
