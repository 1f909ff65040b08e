//! The Authenticode "PE hash" range planner.
//!
//! Turns the structural facts gathered while parsing a PE image into the
//! ordered, non-overlapping [`StreamRange`]s a signer hashes: everything in
//! the header except the checksum field and the security directory entry,
//! every section body sorted by disk offset, and whatever trails the last
//! section once the attached certificate (if any) is carved back out.

use crate::pe::optional_header::data_directories::ImageDataDirectory;
use crate::pe::sections::SectionTableRow;
use crate::rangeplan::{invert, merge_neighbors, HashRangePlan, StreamRange};

/// Builds the hash-range plan for one image.
///
/// `size_of_headers` and `file_length` bound the header region and the
/// whole stream respectively. `check_sum_range`/`security_idd_range` are the
/// two header sub-ranges Authenticode excludes; callers supply them already
/// computed from the optional header's on-stream position, since computing
/// them requires knowing the PE32/PE32+ variant's fixed-portion size.
/// `sections` need not be pre-sorted - this function sorts its own copy by
/// `pointer_to_raw_data`. `certificate_table` is the Certificate Table data
/// directory entry (index 4); its `virtual_address` is a file offset, not
/// an RVA.
pub fn plan(
    size_of_headers: u64,
    file_length: u64,
    check_sum_range: StreamRange,
    security_idd_range: StreamRange,
    sections: &[SectionTableRow],
    certificate_table: ImageDataDirectory,
) -> HashRangePlan {
    let mut excluded = [check_sum_range, security_idd_range];
    excluded.sort_by_key(|range| range.position);

    let mut ranges = invert(size_of_headers, &excluded);

    let mut ordered_sections: Vec<&SectionTableRow> = sections.iter().collect();
    ordered_sections.sort_by_key(|section| section.pointer_to_raw_data);

    let mut end_of_sections = size_of_headers;
    for section in ordered_sections {
        if section.pointer_to_raw_data != 0 && section.size_of_raw_data != 0 {
            let range = StreamRange::new(
                section.pointer_to_raw_data as u64,
                section.size_of_raw_data as u64,
            );
            end_of_sections = end_of_sections.max(range.end());
            ranges.push(range);
        }
    }

    let tail_start = end_of_sections;
    let cert_va = certificate_table.virtual_address as u64;
    let cert_size = certificate_table.size as u64;

    if cert_va == 0 || cert_size == 0 || cert_va >= file_length {
        if tail_start < file_length {
            ranges.push(StreamRange::new(tail_start, file_length - tail_start));
        }
    } else {
        let cert_end = cert_va + cert_size;
        if tail_start < cert_va {
            ranges.push(StreamRange::new(tail_start, cert_va - tail_start));
        }
        if cert_end < file_length {
            ranges.push(StreamRange::new(cert_end, file_length - cert_end));
        }
    }

    merge_neighbors(&mut ranges);

    HashRangePlan {
        ranges,
        reserved_a: 0,
        reserved_b: 0,
    }
}

/// Whether the Certificate Table directory points at a real, in-bounds
/// attachment - the same condition Step D of the planner uses to decide
/// whether trailing data ends at the certificate or at EOF.
pub fn has_signature(certificate_table: ImageDataDirectory, file_length: u64) -> bool {
    let cert_va = certificate_table.virtual_address as u64;
    let cert_size = certificate_table.size as u64;
    cert_va != 0 && cert_size != 0 && cert_va.saturating_add(cert_size) <= file_length
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(pointer_to_raw_data: u32, size_of_raw_data: u32) -> SectionTableRow {
        SectionTableRow {
            pointer_to_raw_data,
            size_of_raw_data,
            ..Default::default()
        }
    }

    const CHECK_SUM: StreamRange = StreamRange {
        position: 0x40,
        size: 4,
    };
    const SECURITY_IDD: StreamRange = StreamRange {
        position: 0x48,
        size: 8,
    };
    const HEADER_SIZE: u64 = 0x100;

    #[test]
    fn unsigned_single_section_plan_covers_header_and_section() {
        let sections = [section(0x200, 0x300)];
        let plan = plan(
            HEADER_SIZE,
            0x500,
            CHECK_SUM,
            SECURITY_IDD,
            &sections,
            ImageDataDirectory::default(),
        );
        assert!(plan.is_sorted_and_merged());
        assert_eq!(
            plan.ranges,
            vec![
                StreamRange::new(0, 0x40),
                StreamRange::new(0x44, 4),
                StreamRange::new(0x50, 0xB0),
                StreamRange::new(0x200, 0x300),
            ]
        );
    }

    #[test]
    fn signature_exactly_at_eof_excludes_certificate_only() {
        let sections = [section(0x200, 0x300)];
        let cert = ImageDataDirectory {
            virtual_address: 0x500,
            size: 0x100,
        };
        let plan = plan(HEADER_SIZE, 0x600, CHECK_SUM, SECURITY_IDD, &sections, cert);
        assert!(has_signature(cert, 0x600));
        // the section ends exactly where the certificate starts, and the
        // certificate itself runs to EOF, so no trailing range is appended.
        assert_eq!(plan.ranges.last(), Some(&StreamRange::new(0x200, 0x300)));
    }

    #[test]
    fn signature_in_the_middle_splits_trailing_data() {
        let sections = [section(0x200, 0x200)];
        let cert = ImageDataDirectory {
            virtual_address: 0x500,
            size: 0x40,
        };
        let plan = plan(HEADER_SIZE, 0x700, CHECK_SUM, SECURITY_IDD, &sections, cert);
        assert!(has_signature(cert, 0x700));
        // the gap between the last section and the certificate is a
        // neighbor of the section body, so it merges into one range.
        assert_eq!(
            plan.ranges[plan.ranges.len() - 2..],
            [StreamRange::new(0x200, 0x300), StreamRange::new(0x540, 0x1C0)]
        );
    }

    #[test]
    fn missing_certificate_table_extends_to_eof() {
        let sections = [section(0x200, 0x200)];
        let plan = plan(
            HEADER_SIZE,
            0x500,
            CHECK_SUM,
            SECURITY_IDD,
            &sections,
            ImageDataDirectory::default(),
        );
        assert!(!has_signature(ImageDataDirectory::default(), 0x500));
        assert_eq!(plan.ranges.last(), Some(&StreamRange::new(0x200, 0x300)));
    }

    #[test]
    fn sections_are_ordered_by_disk_offset_regardless_of_table_order() {
        let sections = [section(0x600, 0x100), section(0x200, 0x200)];
        let plan = plan(
            HEADER_SIZE,
            0x700,
            CHECK_SUM,
            SECURITY_IDD,
            &sections,
            ImageDataDirectory::default(),
        );
        let section_ranges: Vec<_> = plan
            .ranges
            .iter()
            .filter(|r| r.position >= 0x200)
            .cloned()
            .collect();
        assert_eq!(
            section_ranges,
            vec![StreamRange::new(0x200, 0x200), StreamRange::new(0x600, 0x100)]
        );
    }

    #[test]
    fn zero_pointer_or_size_sections_are_skipped() {
        let sections = [section(0, 0x200), section(0x200, 0)];
        let plan = plan(
            HEADER_SIZE,
            HEADER_SIZE,
            CHECK_SUM,
            SECURITY_IDD,
            &sections,
            ImageDataDirectory::default(),
        );
        assert!(plan.ranges.iter().all(|r| r.position < HEADER_SIZE));
    }
}
