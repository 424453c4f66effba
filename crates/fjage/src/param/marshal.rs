// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Copying parameter arrays in and out of caller-owned buffers.

/// Copy the first `min(seq.len(), buf.len())` elements of `seq` into `buf`.
///
/// Returns the number of elements copied. A remote array longer than the
/// buffer is truncated silently; callers compare the count with what they
/// expected.
pub fn marshal_into<T, U, F>(seq: Vec<T>, buf: &mut [U], mut convert: F) -> usize
where
    F: FnMut(T) -> U,
{
    let count = seq.len().min(buf.len());
    for (slot, item) in buf.iter_mut().zip(seq) {
        *slot = convert(item);
    }
    count
}

/// Build an owned sequence from every element of a caller array.
pub fn marshal_out<T, U, F>(src: &[T], convert: F) -> Vec<U>
where
    F: FnMut(&T) -> U,
{
    src.iter().map(convert).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_to_buffer() {
        let mut buf = [0i32; 2];
        assert_eq!(marshal_into(vec![1, 2, 3], &mut buf, |v| v), 2);
        assert_eq!(buf, [1, 2]);
    }

    #[test]
    fn test_short_sequence_leaves_tail_untouched() {
        let mut buf = [-1i64; 4];
        assert_eq!(marshal_into(vec![7i32], &mut buf, i64::from), 1);
        assert_eq!(buf, [7, -1, -1, -1]);
    }

    #[test]
    fn test_empty_buffer() {
        let mut buf: [f32; 0] = [];
        assert_eq!(marshal_into(vec![1.0f32], &mut buf, |v| v), 0);
        assert_eq!(marshal_into(Vec::<f32>::new(), &mut [0.0f32; 3], |v| v), 0);
    }

    #[test]
    fn test_marshal_out_copies() {
        let src = ["Hello", "World"];
        let out = marshal_out(&src, |s| s.to_string());
        assert_eq!(out, vec!["Hello".to_string(), "World".to_string()]);
        assert_eq!(src, ["Hello", "World"]);
    }
}
