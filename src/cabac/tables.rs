// Copyright (c) 2026, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Static CABAC data: fractional bit costs, state transitions and context
// initialisation values.

use super::CABAC_CTXT_END;

/// Cost in Q12 bits of coding a bin, indexed by `state ^ bin` where
/// `state = (pStateIdx << 1) | valMps`.
#[rustfmt::skip]
pub static BIN_TO_BITS_Q12: [u16; 128] = [
  4096, 4096, 3803, 4404, 3538, 4712, 3297, 5020, 3077, 5328,
  2876, 5636, 2690, 5944, 2520, 6252, 2362, 6560, 2217, 6868,
  2082, 7176, 1956, 7484, 1840, 7792, 1731, 8100, 1630, 8408,
  1535, 8716, 1447, 9024, 1364, 9332, 1287, 9640, 1214, 9948,
  1146, 10256, 1082, 10564, 1022, 10872, 966, 11179, 913, 11487,
  863, 11795, 816, 12103, 772, 12411, 730, 12719, 691, 13027,
  654, 13335, 619, 13643, 586, 13951, 554, 14259, 525, 14567,
  497, 14875, 471, 15183, 446, 15491, 423, 15799, 400, 16107,
  379, 16415, 359, 16723, 341, 17031, 323, 17339, 306, 17647,
  290, 17955, 275, 18263, 261, 18571, 247, 18879, 234, 19187,
  222, 19495, 211, 19803, 200, 20111, 190, 20419, 180, 20727,
  171, 21035, 162, 21343, 153, 21651, 146, 21959, 138, 22267,
  131, 22575, 124, 22883, 118, 23191, 112, 23499,
];

/// Next context state, indexed by `(state << 1) | bin`.
#[rustfmt::skip]
pub static NEXT_STATE: [u8; 256] = [
  2, 1, 0, 3, 4, 0, 1, 5, 6, 2, 3, 7, 8, 4, 5, 9,
  10, 4, 5, 11, 12, 8, 9, 13, 14, 8, 9, 15, 16, 10, 11, 17,
  18, 12, 13, 19, 20, 14, 15, 21, 22, 16, 17, 23, 24, 18, 19, 25,
  26, 18, 19, 27, 28, 22, 23, 29, 30, 22, 23, 31, 32, 24, 25, 33,
  34, 26, 27, 35, 36, 26, 27, 37, 38, 30, 31, 39, 40, 30, 31, 41,
  42, 32, 33, 43, 44, 32, 33, 45, 46, 36, 37, 47, 48, 36, 37, 49,
  50, 38, 39, 51, 52, 38, 39, 53, 54, 42, 43, 55, 56, 42, 43, 57,
  58, 44, 45, 59, 60, 44, 45, 61, 62, 46, 47, 63, 64, 48, 49, 65,
  66, 48, 49, 67, 68, 50, 51, 69, 70, 52, 53, 71, 72, 52, 53, 73,
  74, 54, 55, 75, 76, 54, 55, 77, 78, 56, 57, 79, 80, 58, 59, 81,
  82, 58, 59, 83, 84, 60, 61, 85, 86, 60, 61, 87, 88, 60, 61, 89,
  90, 62, 63, 91, 92, 64, 65, 93, 94, 64, 65, 95, 96, 66, 67, 97,
  98, 66, 67, 99, 100, 66, 67, 101, 102, 68, 69, 103, 104, 68, 69, 105,
  106, 70, 71, 107, 108, 70, 71, 109, 110, 70, 71, 111, 112, 72, 73, 113,
  114, 72, 73, 115, 116, 72, 73, 117, 118, 74, 75, 119, 120, 74, 75, 121,
  122, 74, 75, 123, 124, 76, 77, 125, 124, 76, 77, 125, 126, 126, 127, 127,
];

/// Context initialisation values per init type, in context index order.
#[rustfmt::skip]
pub static INIT_VALUES: [[u8; CABAC_CTXT_END]; 3] = [
  [
    // split_transform_flag
    153, 138, 138,
    // cbf_luma
    111, 141,
    // cbf_cb, cbf_cr
    94, 138, 182, 154, 154,
    // sig_coeff_flag
    111, 111, 125, 110, 110, 94, 124, 108, 124, 107, 125, 141, 179, 153,
    125, 107, 125, 141, 179, 153, 125, 107, 125, 141, 179, 153, 125, 140,
    139, 182, 182, 152, 136, 152, 136, 153, 136, 139, 111, 136, 139, 111,
    // coeff_abs_level_greater1_flag
    140, 92, 137, 138, 140, 152, 138, 139, 153, 74, 149, 92, 139, 107,
    122, 152, 140, 179, 166, 182, 140, 227, 122, 197,
    // coeff_abs_level_greater2_flag
    138, 153, 136, 167, 152, 152,
  ],
  [
    // split_transform_flag
    124, 138, 94,
    // cbf_luma
    153, 111,
    // cbf_cb, cbf_cr
    149, 107, 167, 154, 154,
    // sig_coeff_flag
    155, 154, 139, 153, 139, 123, 123, 63, 153, 166, 183, 140, 136, 153,
    154, 166, 183, 140, 136, 153, 154, 166, 183, 140, 136, 153, 154, 170,
    153, 123, 123, 107, 121, 107, 121, 167, 151, 183, 140, 151, 183, 140,
    // coeff_abs_level_greater1_flag
    154, 196, 196, 167, 154, 152, 167, 182, 182, 134, 149, 136, 153, 121,
    136, 137, 169, 194, 166, 167, 154, 167, 137, 182,
    // coeff_abs_level_greater2_flag
    107, 167, 91, 122, 107, 167,
  ],
  [
    // split_transform_flag
    224, 167, 122,
    // cbf_luma
    153, 111,
    // cbf_cb, cbf_cr
    149, 92, 167, 154, 154,
    // sig_coeff_flag
    170, 154, 139, 153, 139, 123, 123, 63, 124, 166, 183, 140, 136, 153,
    154, 166, 183, 140, 136, 153, 154, 166, 183, 140, 136, 153, 154, 170,
    153, 138, 138, 122, 121, 122, 121, 167, 151, 183, 140, 151, 183, 140,
    // coeff_abs_level_greater1_flag
    154, 196, 167, 167, 154, 152, 167, 182, 182, 134, 149, 136, 153, 121,
    136, 122, 169, 208, 166, 167, 154, 152, 167, 182,
    // coeff_abs_level_greater2_flag
    107, 167, 91, 107, 107, 167,
  ],
];
