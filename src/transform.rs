//! The vectorised SHA-256 block transform, written once against the `Lane`
//! trait and shared by every lane width.

use crate::constants::K;
use crate::lanes::Lane;

#[inline]
fn rotr<const W: usize, L: Lane<W>>(x: L, n: u32) -> L {
    x.rotr(n)
}

#[inline]
fn bsig0<const W: usize, L: Lane<W>>(x: L) -> L {
    rotr(x, 2).xor(rotr(x, 13)).xor(rotr(x, 22))
}

#[inline]
fn bsig1<const W: usize, L: Lane<W>>(x: L) -> L {
    rotr(x, 6).xor(rotr(x, 11)).xor(rotr(x, 25))
}

#[inline]
fn ssig0<const W: usize, L: Lane<W>>(x: L) -> L {
    rotr(x, 7).xor(rotr(x, 18)).xor(x.shr(3))
}

#[inline]
fn ssig1<const W: usize, L: Lane<W>>(x: L) -> L {
    rotr(x, 17).xor(rotr(x, 19)).xor(x.shr(10))
}

#[inline]
fn ch<const W: usize, L: Lane<W>>(x: L, y: L, z: L) -> L {
    x.and(y).xor(x.andnot(z))
}

#[inline]
fn maj<const W: usize, L: Lane<W>>(x: L, y: L, z: L) -> L {
    x.and(y).xor(x.and(z)).xor(y.and(z))
}

/// `transform(state_in, block) = state_in + compress(state_in, block)`,
/// lanewise and independently per lane (§4.1).
pub fn transform<const W: usize, L: Lane<W>>(state_in: [L; 8], block: [L; 16]) -> [L; 8] {
    let mut w = [state_in[0]; 64];
    w[..16].copy_from_slice(&block);
    for t in 16..64 {
        w[t] = ssig1(w[t - 2])
            .add(w[t - 7])
            .add(ssig0(w[t - 15]))
            .add(w[t - 16]);
    }

    let mut a = state_in[0];
    let mut b = state_in[1];
    let mut c = state_in[2];
    let mut d = state_in[3];
    let mut e = state_in[4];
    let mut f = state_in[5];
    let mut g = state_in[6];
    let mut h = state_in[7];

    for t in 0..64 {
        let k_t = L::splat(K[t]);
        let t1 = h.add(bsig1(e)).add(ch(e, f, g)).add(k_t).add(w[t]);
        let t2 = bsig0(a).add(maj(a, b, c));
        h = g;
        g = f;
        f = e;
        e = d.add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.add(t2);
    }

    [
        state_in[0].add(a),
        state_in[1].add(b),
        state_in[2].add(c),
        state_in[3].add(d),
        state_in[4].add(e),
        state_in[5].add(f),
        state_in[6].add(g),
        state_in[7].add(h),
    ]
}
