/// Per-channel sample sequences awaiting a flush.
///
/// Samples only enter through [`SampleBuffer::push_tick`], which takes one value for every
/// channel at once, so all sequences always have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    channels: Vec<Vec<i32>>,
}

impl SampleBuffer {
    pub fn new(channel_count: usize, capacity: usize) -> SampleBuffer {
        SampleBuffer { channels: (0..channel_count).map(|_| Vec::with_capacity(capacity)).collect() }
    }

    /// Number of samples held for each channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_tick(&mut self, tick: &[i32]) {
        assert_eq!(tick.len(), self.channels.len(), "tick must carry one sample per channel");
        for (samples, &value) in self.channels.iter_mut().zip(tick) {
            samples.push(value);
        }
    }

    pub fn channel(&self, index: usize) -> &[i32] {
        &self.channels[index]
    }

    /// Move all buffered samples out, leaving every channel empty.
    pub fn take(&mut self) -> Vec<Vec<i32>> {
        self.channels.iter_mut()
            .map(|samples| {
                let capacity = samples.capacity();
                std::mem::replace(samples, Vec::with_capacity(capacity))
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_tick_keeps_channels_aligned() {
        let mut buffer = SampleBuffer::new(3, 4);
        assert!(buffer.is_empty());
        for tick in 0..5 {
            buffer.push_tick(&[tick, -tick, tick * 2]);
            assert_eq!(buffer.len(), tick as usize + 1);
            for channel in 0..3 {
                assert_eq!(buffer.channel(channel).len(), buffer.len());
            }
        }
        assert_eq!(buffer.channel(1), [0, -1, -2, -3, -4]);
    }

    #[test]
    #[should_panic]
    fn test_push_partial_tick() {
        let mut buffer = SampleBuffer::new(3, 4);
        buffer.push_tick(&[1, 2]);
    }

    #[test]
    fn test_take_empties_all_channels() {
        let mut buffer = SampleBuffer::new(2, 4);
        buffer.push_tick(&[1, 2]);
        buffer.push_tick(&[3, 4]);
        assert_eq!(buffer.take(), vec![vec![1, 3], vec![2, 4]]);
        assert!(buffer.is_empty());
        buffer.push_tick(&[5, 6]);
        assert_eq!(buffer.channel(0), [5]);
        assert_eq!(buffer.channel(1), [6]);
    }
}
