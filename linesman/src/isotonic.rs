//! Isotonic (non-decreasing) regression by pooling adjacent violators.

/// Returns the least-squares non-decreasing fit to `values`, giving each value equal weight.
/// Adjacent values that violate the ordering are pooled into blocks and replaced with the block mean.
pub fn pool_adjacent_violators(values: &[f64]) -> Vec<f64> {
    // each block is (sum, count)
    let mut blocks: Vec<(f64, usize)> = Vec::with_capacity(values.len());
    for &value in values {
        blocks.push((value, 1));
        while blocks.len() > 1 {
            let (last_sum, last_count) = blocks[blocks.len() - 1];
            let (prev_sum, prev_count) = blocks[blocks.len() - 2];
            if prev_sum / prev_count as f64 <= last_sum / last_count as f64 {
                break;
            }
            blocks.pop();
            let len = blocks.len();
            blocks[len - 1] = (prev_sum + last_sum, prev_count + last_count);
        }
    }

    let mut fitted = Vec::with_capacity(values.len());
    for (sum, count) in blocks {
        let mean = sum / count as f64;
        fitted.extend(std::iter::repeat(mean).take(count));
    }
    fitted
}
