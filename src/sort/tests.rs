use super::*;
use crate::encoding::{EncodingProfile, Newline, TextEncoding};
use crate::error::SortError;
use crate::index::{IndexRecord, MemoryIndex, build_index};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn lf() -> EncodingProfile {
    EncodingProfile::utf8(Newline::Lf)
}

fn write_source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

fn sort_bytes(data: &[u8], profile: &EncodingProfile) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "input.txt", data);
    let out = sort_file(&src, profile).unwrap();
    fs::read(out).unwrap()
}

/// Counts calls and checks that every pair handed out is in range.
struct CountingKeys {
    values: Vec<u32>,
    compares: u64,
    swaps: u64,
}

impl SortKeys for CountingKeys {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn compare(&mut self, i: usize, j: usize) -> crate::error::Result<Ordering> {
        assert!(i < j && j < self.values.len());
        self.compares += 1;
        Ok(self.values[i].cmp(&self.values[j]))
    }

    fn swap(&mut self, i: usize, j: usize) -> crate::error::Result<()> {
        assert!(self.values[i] > self.values[j], "swap of an ordered pair");
        self.swaps += 1;
        self.values.swap(i, j);
        Ok(())
    }
}

// ---- Comb sort ----

#[test]
fn test_gap_sequence() {
    let mut gaps = vec![(10f64 / SHRINK_FACTOR) as usize];
    while *gaps.last().unwrap() > 1 {
        let g = next_gap(*gaps.last().unwrap(), SHRINK_FACTOR);
        gaps.push(g);
    }
    assert_eq!(gaps, vec![8, 6, 4, 3, 2, 1]);
}

#[test]
fn test_next_gap_always_shrinks() {
    assert_eq!(next_gap(5, 1.0), 4);
    assert_eq!(next_gap(2, 1.5), 1);
    assert_eq!(next_gap(1, 1.247), 1);
    assert_eq!(next_gap(0, 1.247), 1);
}

#[test]
fn test_comb_sort_small_inputs() {
    let mut empty: Vec<u32> = Vec::new();
    assert_eq!(comb_sort(&mut empty[..], SHRINK_FACTOR).unwrap(), CombStats::default());

    let mut one = vec![7u32];
    let stats = comb_sort(&mut one[..], SHRINK_FACTOR).unwrap();
    assert_eq!(one, vec![7]);
    assert_eq!(stats.compares, 0);

    let mut two = vec![2u32, 1];
    comb_sort(&mut two[..], SHRINK_FACTOR).unwrap();
    assert_eq!(two, vec![1, 2]);
}

#[test]
fn test_comb_sort_reversed_with_duplicates() {
    let mut v: Vec<u32> = (0..500).rev().map(|x| x % 37).collect();
    let mut expected = v.clone();
    expected.sort();
    comb_sort(&mut v[..], SHRINK_FACTOR).unwrap();
    assert_eq!(v, expected);
}

#[test]
fn test_comb_sort_sorted_input_makes_no_swaps() {
    let mut keys = CountingKeys {
        values: (0..100).collect(),
        compares: 0,
        swaps: 0,
    };
    let stats = comb_sort(&mut keys, SHRINK_FACTOR).unwrap();
    assert_eq!(stats.swaps, 0);
    assert_eq!(keys.swaps, 0);
    assert_eq!(stats.compares, keys.compares);
    // Every gap down to 1 runs once, the final gap-1 pass included.
    assert!(stats.passes >= 2);
}

#[test]
fn test_comb_sort_counters_match_calls() {
    let mut keys = CountingKeys {
        values: vec![5, 3, 9, 1, 1, 8, 0, 2],
        compares: 0,
        swaps: 0,
    };
    let stats = comb_sort(&mut keys, SHRINK_FACTOR).unwrap();
    assert_eq!(keys.values, vec![0, 1, 1, 2, 3, 5, 8, 9]);
    assert_eq!(stats.compares, keys.compares);
    assert_eq!(stats.swaps, keys.swaps);
}

#[test]
fn test_comb_sort_custom_shrink_factor() {
    let mut v: Vec<u32> = (0..200).rev().collect();
    comb_sort(&mut v[..], 1.3).unwrap();
    assert!(v.windows(2).all(|w| w[0] <= w[1]));
}

// ---- Disk keys and writer ----

#[test]
fn test_disk_keys_compare_and_swap_touch_index_only() {
    let data = b"pear\napple\nfig\n".to_vec();
    let profile = lf();
    let mut source = Cursor::new(data.clone());
    let mut store = MemoryIndex::new();
    let summary = build_index(&mut source, &profile, &mut store).unwrap();
    let mut scratch = LineScratch::new(summary.max_line_len);
    {
        let mut keys = DiskKeys::new(&mut store, &mut source, &profile, &mut scratch);
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.compare(0, 1).unwrap(), Ordering::Greater);
        assert_eq!(keys.compare(1, 2).unwrap(), Ordering::Less);
        keys.swap(0, 2).unwrap();
        assert_eq!(keys.compare(0, 2).unwrap(), Ordering::Less);
    }
    assert_eq!(source.get_ref(), &data);
    assert_eq!(
        store.records(),
        &[
            IndexRecord {
                offset: 11,
                length: 3
            },
            IndexRecord {
                offset: 5,
                length: 5
            },
            IndexRecord {
                offset: 0,
                length: 4
            },
        ]
    );
}

#[test]
fn test_scratch_rejects_record_longer_than_max() {
    let mut source = Cursor::new(b"abcdef".to_vec());
    let mut scratch = LineScratch::new(3);
    let err = scratch
        .read_line(
            &mut source,
            IndexRecord {
                offset: 0,
                length: 4,
            },
        )
        .unwrap_err();
    assert!(matches!(err, SortError::IndexCorrupt(_)));
    let line = scratch
        .read_line(
            &mut source,
            IndexRecord {
                offset: 3,
                length: 3,
            },
        )
        .unwrap();
    assert_eq!(line, b"def");
}

#[test]
fn test_scratch_reserves_decode_space_only_on_demand() {
    let mut scratch = LineScratch::new(100);
    let initial = scratch.reserved();
    assert!((200..300).contains(&initial), "reserved {}", initial);

    let mut source = Cursor::new(b"b\na\n".to_vec());
    let a = IndexRecord {
        offset: 0,
        length: 1,
    };
    let b = IndexRecord {
        offset: 2,
        length: 1,
    };
    let ord = scratch.compare(&mut source, &lf(), a, b).unwrap();
    assert_eq!(ord, Ordering::Greater);
    assert_eq!(scratch.reserved(), initial);

    let utf16 = EncodingProfile::new(TextEncoding::Utf16Le, Newline::Lf, false);
    let mut source = Cursor::new(vec![b'b', 0, b'a', 0]);
    let a = IndexRecord {
        offset: 0,
        length: 2,
    };
    let b = IndexRecord {
        offset: 2,
        length: 2,
    };
    let ord = scratch.compare(&mut source, &utf16, a, b).unwrap();
    assert_eq!(ord, Ordering::Greater);
    assert!(scratch.reserved() > initial);
}

#[test]
fn test_scratch_record_past_eof_is_io_error() {
    let mut source = Cursor::new(b"ab".to_vec());
    let mut scratch = LineScratch::new(8);
    let err = scratch
        .read_line(
            &mut source,
            IndexRecord {
                offset: 1,
                length: 5,
            },
        )
        .unwrap_err();
    assert!(matches!(err, SortError::Io(_)));
}

#[test]
fn test_materialize_writes_bom_and_terminators() {
    let profile = EncodingProfile::new(TextEncoding::Utf8, Newline::CrLf, true);
    let mut source = Cursor::new(b"\xEF\xBB\xBFb\r\na".to_vec());
    let mut store = MemoryIndex::new();
    let summary = build_index(&mut source, &profile, &mut store).unwrap();
    let mut scratch = LineScratch::new(summary.max_line_len);
    let mut out = Vec::new();
    let n = materialize(&mut store, &mut source, &profile, &mut scratch, &mut out).unwrap();
    assert_eq!(n, 2);
    assert_eq!(out, b"\xEF\xBB\xBFb\r\na\r\n");
}

// ---- End to end ----

#[test]
fn test_sort_basic() {
    assert_eq!(
        sort_bytes(b"banana\napple\ncherry\n", &lf()),
        b"apple\nbanana\ncherry\n"
    );
}

#[test]
fn test_sort_unterminated_last_line() {
    assert_eq!(sort_bytes(b"c\nb\na", &lf()), b"a\nb\nc\n");
}

#[test]
fn test_sort_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "empty.txt", b"");
    let report = FileSorter::new(lf(), SortConfig::default())
        .sort_with_report(&src)
        .unwrap();
    assert_eq!(report.lines, 0);
    assert_eq!(report.max_line_len, 0);
    assert_eq!(report.source_bytes, 0);
    assert_eq!(fs::read(&report.output).unwrap(), b"");
}

#[test]
fn test_sort_consumes_bom() {
    let profile = EncodingProfile::new(TextEncoding::Utf8, Newline::Lf, true);
    assert_eq!(
        sort_bytes(b"\xEF\xBB\xBFzeta\nalpha\n", &profile),
        b"\xEF\xBB\xBFalpha\nzeta\n"
    );
}

#[test]
fn test_sort_is_ordinal_not_locale() {
    assert_eq!(
        sort_bytes("b\nB\na\nA\n\u{e9}\n_\n".as_bytes(), &lf()),
        "A\nB\n_\na\nb\n\u{e9}\n".as_bytes()
    );
}

#[test]
fn test_sort_duplicates_and_empty_lines() {
    assert_eq!(
        sort_bytes(b"b\n\na\nb\n\n", &lf()),
        b"\n\na\nb\nb\n"
    );
}

#[test]
fn test_sort_crlf() {
    let profile = EncodingProfile::utf8(Newline::CrLf);
    assert_eq!(
        sort_bytes(b"two\r\none\r\nthree", &profile),
        b"one\r\nthree\r\ntwo\r\n"
    );
}

#[test]
fn test_sort_utf16le() {
    let profile = EncodingProfile::new(TextEncoding::Utf16Le, Newline::Lf, true);
    let mut input = profile.bom().to_vec();
    profile.encode("\u{1F600}\nzeta\n\u{FF5E}\nalpha\n", &mut input);
    let mut expected = profile.bom().to_vec();
    profile.encode("alpha\nzeta\n\u{FF5E}\n\u{1F600}\n", &mut expected);
    assert_eq!(sort_bytes(&input, &profile), expected);
}

#[test]
fn test_sort_longest_line_round_trips() {
    let long = "q".repeat(4096);
    let input = format!("m\n{}\na\n{}r\n", long, long);
    let expected = format!("a\nm\n{}\n{}r\n", long, long);
    assert_eq!(sort_bytes(input.as_bytes(), &lf()), expected.as_bytes());
}

#[test]
fn test_sort_idempotent() {
    let once = sort_bytes(b"delta\nalpha\ncharlie\nbravo\nalpha\n", &lf());
    let twice = sort_bytes(&once, &lf());
    assert_eq!(once, twice);
}

#[test]
fn test_output_naming_and_index_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "data.txt", b"b\na\n");
    let out = sort_file(&src, &lf()).unwrap();
    assert_eq!(out, dir.path().join("data.txt_sorted.txt"));
    assert!(!dir.path().join("data.txt_map.bin").exists());
    assert_eq!(fs::read(&src).unwrap(), b"b\na\n", "source must be untouched");
}

#[test]
fn test_keep_index_leaves_sorted_records() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "data.txt", b"ccc\na\nbb\n");
    let config = SortConfig {
        keep_index: true,
        ..SortConfig::default()
    };
    FileSorter::new(lf(), config).sort(&src).unwrap();
    let raw = fs::read(dir.path().join("data.txt_map.bin")).unwrap();
    assert_eq!(raw.len(), 36);
    let offsets: Vec<i64> = raw
        .chunks_exact(12)
        .map(|c| {
            let mut b = [0u8; 12];
            b.copy_from_slice(c);
            IndexRecord::from_bytes(&b).offset
        })
        .collect();
    assert_eq!(offsets, vec![4, 6, 0]);
}

#[test]
fn test_custom_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "x", b"2\n1\n");
    let config = SortConfig {
        output_suffix: ".out".to_string(),
        index_suffix: ".idx".to_string(),
        ..SortConfig::default()
    };
    let out = FileSorter::new(lf(), config).sort(&src).unwrap();
    assert_eq!(out, dir.path().join("x.out"));
    assert_eq!(fs::read(out).unwrap(), b"1\n2\n");
}

#[test]
fn test_invalid_path_fails_fast() {
    let sorter = FileSorter::default();
    assert!(matches!(sorter.sort(""), Err(SortError::InvalidPath(_))));
    assert!(matches!(sorter.sort("   "), Err(SortError::InvalidPath(_))));
}

#[test]
fn test_missing_source_is_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("missing.txt");
    let err = sort_file(&src, &lf()).unwrap_err();
    match err {
        SortError::Open { path, source } => {
            assert_eq!(path, src);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.path().join("missing.txt_map.bin").exists());
}

#[test]
fn test_invalid_shrink_factor() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "s.txt", b"a\n");
    for shrink in [1.0, 0.5, f64::NAN, f64::INFINITY] {
        let config = SortConfig {
            shrink_factor: shrink,
            ..SortConfig::default()
        };
        let err = FileSorter::new(lf(), config).sort(&src).unwrap_err();
        assert!(matches!(err, SortError::InvalidConfig(_)));
    }
}

#[test]
fn test_failed_run_removes_index() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "f.txt", b"b\na\n");
    // A directory where the output file should go makes the write phase fail.
    fs::create_dir(dir.path().join("f.txt_sorted.txt")).unwrap();
    let err = sort_file(&src, &lf()).unwrap_err();
    assert!(matches!(err, SortError::Open { .. }));
    assert!(!dir.path().join("f.txt_map.bin").exists());
}

#[test]
fn test_failed_run_keeps_index_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "f.txt", b"b\na\n");
    fs::create_dir(dir.path().join("f.txt_sorted.txt")).unwrap();
    let config = SortConfig {
        keep_index: true,
        ..SortConfig::default()
    };
    assert!(FileSorter::new(lf(), config).sort(&src).is_err());
    assert_eq!(
        fs::metadata(dir.path().join("f.txt_map.bin")).unwrap().len(),
        24
    );
}

#[test]
fn test_report_counts() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_source(dir.path(), "r.txt", b"ccc\nbb\na");
    let report = FileSorter::default().sort_with_report(&src).unwrap();
    assert_eq!(report.lines, 3);
    assert_eq!(report.max_line_len, 3);
    assert_eq!(report.source_bytes, 8);
    assert!(report.stats.swaps > 0);
    assert!(report.stats.compares >= report.stats.swaps);
}

#[test]
fn test_with_suffix_appends_to_full_name() {
    assert_eq!(
        with_suffix(Path::new("/tmp/a.txt"), "_sorted.txt"),
        PathBuf::from("/tmp/a.txt_sorted.txt")
    );
}

// ---- Properties ----

fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9 ]{0,12}", 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_comb_sort_matches_std_sort(mut v in prop::collection::vec(any::<u16>(), 0..300)) {
        let mut expected = v.clone();
        expected.sort_unstable();
        comb_sort(&mut v[..], SHRINK_FACTOR).unwrap();
        prop_assert_eq!(v, expected);
    }

    #[test]
    fn prop_file_sort_is_sorted_permutation(lines in arb_lines(), trailing in any::<bool>()) {
        let mut input = String::new();
        for line in &lines {
            input.push_str(line);
            input.push('\n');
        }
        // Dropping the final terminator is only unambiguous for a nonempty last line.
        if !trailing && lines.last().is_some_and(|l| !l.is_empty()) {
            input.pop();
        }

        let output = sort_bytes(input.as_bytes(), &lf());

        let mut expected = lines.clone();
        expected.sort();
        let mut expected_bytes = Vec::new();
        for line in &expected {
            expected_bytes.extend_from_slice(line.as_bytes());
            expected_bytes.push(b'\n');
        }
        prop_assert_eq!(&output, &expected_bytes);

        // Sorting sorted output changes nothing.
        prop_assert_eq!(sort_bytes(&output, &lf()), output);
    }
}
