// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod include;
pub mod isr;
pub mod skip;
pub mod vendor;

pub use include::IncludeAugmenter;
pub use isr::IsrNoBlock;
pub use skip::SkipFile;
pub use vendor::VendorLibrary;
