use crate::summary::round2;

/// Map the secondary accuracy indicator (metres) onto a 0-100 signal scale.
///
/// Bands: <=10 excellent (90-100), <=50 very good (80-89), <=100 good
/// (70-79), <=500 fair (50-69), <=2000 poor (20-49), beyond that very poor
/// (1-19).
pub fn signal_strength(accuracy: f64) -> f64 {
    let strength = if accuracy <= 10.0 {
        90.0 + (10.0 - accuracy).min(10.0)
    } else if accuracy <= 50.0 {
        80.0 + ((50.0 - accuracy) / 4.5).min(9.0)
    } else if accuracy <= 100.0 {
        70.0 + ((100.0 - accuracy) / 5.6).min(9.0)
    } else if accuracy <= 500.0 {
        50.0 + ((500.0 - accuracy) / 21.1).min(19.0)
    } else if accuracy <= 2000.0 {
        20.0 + ((2000.0 - accuracy) / 51.7).min(29.0)
    } else {
        (20.0 - (accuracy - 2000.0) / 500.0).max(1.0)
    };
    round2(strength)
}
