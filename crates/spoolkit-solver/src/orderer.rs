//! Segment ordering: orient raw segments into a directed chain.
//!
//! The CAD host hands segments over in selection order with arbitrary
//! direction. Each segment is flipped as needed so that its `start` touches
//! the end of the nearest preceding real segment; the very first segment is
//! anchored at the thread origin. Gaps pass through untouched and the chain
//! continues across them. A segment that touches neither endpoint is a hard
//! connectivity error, never guessed around.

use spoolkit_core::{Error, PathElement, Point3, Result, Segment, ThreadPath};
use tracing::debug;

/// Orient a raw segment list into a directed [`ThreadPath`].
///
/// `None` entries are anchor gaps. Endpoint comparisons use coordinates
/// rounded to a fixed precision, absorbing floating noise from the export.
pub fn order_path(elements: Vec<Option<Segment>>, origin: Point3) -> Result<ThreadPath> {
    let mut ordered = Vec::with_capacity(elements.len());
    let mut chain_point: Option<Point3> = None;

    for (index, element) in elements.into_iter().enumerate() {
        let segment = match element {
            Some(segment) => segment,
            None => {
                ordered.push(PathElement::Gap);
                continue;
            }
        };

        if segment.is_degenerate() {
            return Err(Error::geometry(
                index,
                format!("zero-length segment at {}", segment.start),
            ));
        }

        let target = chain_point.unwrap_or(origin);
        let oriented = if segment.start.coincident(&target) {
            segment
        } else if segment.end.coincident(&target) {
            segment.reversed()
        } else {
            return Err(Error::Connectivity {
                index,
                expected: target,
            });
        };

        chain_point = Some(oriented.end);
        ordered.push(PathElement::Segment(oriented));
    }

    let path = ThreadPath::new(ordered);
    debug!(
        segments = path.segments().count(),
        gaps = path.gap_count(),
        "ordered thread path"
    );
    Ok(path)
}
