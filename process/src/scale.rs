const AMIN: f32 = 1e-10;

/// Converts power to decibels relative to the loudest cell.
///
/// The peak maps to 0 dB. With `top_db` set, everything more than `top_db`
/// below the peak is clipped to `-top_db`.
pub fn power_to_db(power: &[Vec<f32>], top_db: Option<f32>) -> Vec<Vec<f32>> {
    let reference = power
        .iter()
        .flatten()
        .copied()
        .fold(0.0f32, f32::max)
        .max(AMIN);
    let ref_db = 10.0 * reference.log10();

    let mut db: Vec<Vec<f32>> = power
        .iter()
        .map(|frame| frame.iter().map(|p| 10.0 * p.max(AMIN).log10() - ref_db).collect())
        .collect();

    if let Some(top_db) = top_db {
        let peak = db.iter().flatten().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - top_db;
        db.iter_mut().flatten().for_each(|v| *v = v.max(floor));
    }

    db
}
