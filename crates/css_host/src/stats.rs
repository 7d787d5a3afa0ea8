//! Latency statistics tracking for decoder benchmarks.
//!
//! Collects per-shot decoding latencies and reports minimum, maximum,
//! average and a coarse histogram.

const NUM_BUCKETS: usize = 20;
const BUCKET_NANOS: u64 = 10_000;

/// Tracks latency statistics with minimal overhead.
///
/// Each rayon worker keeps its own tracker; trackers are combined with
/// [`LatencyStats::merge`] once the batch is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
    pub count: u64,
    pub buckets: [u64; NUM_BUCKETS],
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    /// Creates an empty tracker; the first measurement becomes the minimum.
    pub fn new() -> Self {
        Self {
            min: u64::MAX,
            max: 0,
            sum: 0,
            count: 0,
            buckets: [0; NUM_BUCKETS],
        }
    }

    /// Records a latency measurement in nanoseconds.
    ///
    /// Buckets are 10 microseconds wide; the last one collects everything
    /// slower.
    pub fn update(&mut self, nanos: u64) {
        self.min = self.min.min(nanos);
        self.max = self.max.max(nanos);
        self.sum += nanos;
        self.count += 1;

        let idx = (nanos / BUCKET_NANOS).min(NUM_BUCKETS as u64 - 1) as usize;
        self.buckets[idx] += 1;
    }

    /// Folds another tracker into this one.
    pub fn merge(mut self, other: LatencyStats) -> LatencyStats {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
        for (a, b) in self.buckets.iter_mut().zip(other.buckets) {
            *a += b;
        }
        self
    }

    /// Average latency in nanoseconds, or 0.0 if nothing was recorded.
    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Prints a formatted report, switching to microseconds above 1 us.
    pub fn print_report(&self) {
        println!("\nLatency Metrics (per shot)");
        println!("Count: {}", self.count);
        if self.count == 0 {
            return;
        }

        let avg_ns = self.avg();
        if avg_ns < 1000.0 {
            println!("Min:   {:.2} ns", self.min as f64);
            println!("Avg:   {:.2} ns", avg_ns);
            println!("Max:   {:.2} ns", self.max as f64);
        } else {
            println!("Min:   {:.2} us", self.min as f64 / 1000.0);
            println!("Avg:   {:.2} us", avg_ns / 1000.0);
            println!("Max:   {:.2} us", self.max as f64 / 1000.0);
        }

        println!("Distribution (10us buckets):");
        for (i, &count) in self.buckets.iter().enumerate() {
            if count > 0 {
                let range_end = if i == NUM_BUCKETS - 1 { ">" } else { "" };
                println!("[{:3}-{:3}{} us]: {}", i * 10, (i + 1) * 10, range_end, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_combines_trackers() {
        let mut a = LatencyStats::new();
        a.update(500);
        a.update(25_000);
        let mut b = LatencyStats::new();
        b.update(1_000_000);
        let all = a.merge(b);
        assert_eq!(all.count, 3);
        assert_eq!(all.min, 500);
        assert_eq!(all.max, 1_000_000);
        assert_eq!(all.buckets[0], 1);
        assert_eq!(all.buckets[2], 1);
        assert_eq!(all.buckets[NUM_BUCKETS - 1], 1);
    }

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(LatencyStats::default().avg(), 0.0);
    }
}
