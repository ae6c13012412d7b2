#![no_main]
use bom_recon::ReconcileEngine;
use bom_recon::model::{ActualPart, BomLineItem};
use libfuzzer_sys::fuzz_target;

/// Reconcile arbitrary quantity pairs over a small material alphabet and
/// check the classification counts add up. Sums past `i64::MAX` must be
/// rejected rather than wrap.
fuzz_target!(|data: &[u8]| {
    let mut bom = Vec::new();
    let mut actual = Vec::new();
    for (i, chunk) in data.chunks_exact(3).enumerate() {
        let material = format!("M{}", chunk[0] % 8);
        // High bit of the selector scales the quantity towards i64::MAX.
        let qty = if chunk[1] & 0x80 == 0 {
            i64::from(chunk[2])
        } else {
            i64::MAX - i64::from(chunk[2])
        };
        if chunk[1] % 2 == 0 {
            bom.push(BomLineItem {
                id: i as u64 + 1,
                bom_code: "FZ".to_string(),
                version_tag: "default".to_string(),
                part_reference: String::new(),
                material,
                description: String::new(),
                qty,
            });
        } else if let Ok(part) = ActualPart::new(material, qty) {
            actual.push(part);
        }
    }

    if let Ok(result) = ReconcileEngine::new().reconcile_version("FZ", "default", &bom, &actual) {
        let summary = &result.summary;
        assert_eq!(
            summary.shortages + summary.excesses + summary.unlisted,
            result.items.len()
        );
        assert_eq!(summary.matched + result.items.len(), summary.materials);
    }
});
