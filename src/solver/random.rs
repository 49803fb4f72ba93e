//! A tiny linear-congruential generator, grounded on the teacher's
//! `minisat::random::Random`, used for random variable decisions and
//! restart jitter. Not cryptographic; deterministic given a seed so runs
//! reproduce.
pub struct Random {
    seed: f64,
}

impl Random {
    pub fn new(seed: f64) -> Random {
        Random { seed }
    }

    pub fn drand(&mut self) -> f64 {
        self.seed *= 1389796.0;
        let q = (self.seed / 2147483647.0) as i32;
        self.seed -= q as f64 * 2147483647.0;
        self.seed / 2147483647.0
    }

    pub fn irand(&mut self, size: u32) -> u32 {
        (self.drand() * size as f64) as u32
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.drand() < p
    }
}

pub fn luby(restart_inc: f64, mut x: u32) -> f64 {
    let mut size = 1u32;
    let mut seq = 0u32;
    while size < x + 1 {
        seq += 1;
        size = 2 * size + 1;
    }
    while size - 1 != x {
        size = (size - 1) / 2;
        seq -= 1;
        x %= size;
    }
    restart_inc.powi(seq as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_sequence_matches_known_prefix() {
        let seq: Vec<u32> = (0..7).map(|i| luby(2.0, i) as u32).collect();
        assert_eq!(seq, vec![1, 1, 2, 1, 1, 2, 4]);
    }

    #[test]
    fn drand_stays_in_unit_interval() {
        let mut r = Random::new(42.0);
        for _ in 0..100 {
            let x = r.drand();
            assert!(x >= 0.0 && x < 1.0);
        }
    }
}
