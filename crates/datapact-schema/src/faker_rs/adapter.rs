use fake::Fake;
use fake::faker::{address, company, internet, job, lorem, name, phone_number};
use rand::RngCore;

use super::{FakeCategory, FakeProvider, LocaleKey};

/// [`FakeProvider`] backed by the `fake` crate.
///
/// Name categories honor `pt_BR`; every other category is rendered with the
/// `en` catalog regardless of locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeRsProvider;

impl FakeProvider for FakeRsProvider {
    fn fake(
        &self,
        category: FakeCategory,
        locale: LocaleKey,
        rng: &mut dyn RngCore,
    ) -> Option<String> {
        let value = match (category, locale) {
            (FakeCategory::FirstName, LocaleKey::PtBr) => name::pt_br::FirstName().fake_with_rng(rng),
            (FakeCategory::LastName, LocaleKey::PtBr) => name::pt_br::LastName().fake_with_rng(rng),
            (FakeCategory::FullName, LocaleKey::PtBr) => name::pt_br::Name().fake_with_rng(rng),
            (FakeCategory::FirstName, _) => name::en::FirstName().fake_with_rng(rng),
            (FakeCategory::LastName, _) => name::en::LastName().fake_with_rng(rng),
            (FakeCategory::FullName, _) => name::en::Name().fake_with_rng(rng),
            (FakeCategory::Email, _) => internet::en::SafeEmail().fake_with_rng(rng),
            (FakeCategory::Username, _) => internet::en::Username().fake_with_rng(rng),
            (FakeCategory::Phone, _) => phone_number::en::PhoneNumber().fake_with_rng(rng),
            (FakeCategory::Company, _) => company::en::CompanyName().fake_with_rng(rng),
            (FakeCategory::JobTitle, _) => job::en::Title().fake_with_rng(rng),
            (FakeCategory::City, _) => address::en::CityName().fake_with_rng(rng),
            (FakeCategory::Country, _) => address::en::CountryName().fake_with_rng(rng),
            (FakeCategory::Street, _) => address::en::StreetName().fake_with_rng(rng),
            (FakeCategory::Postcode, _) => address::en::ZipCode().fake_with_rng(rng),
            (FakeCategory::Ipv4, _) => internet::en::IPv4().fake_with_rng(rng),
            (FakeCategory::Domain, _) => internet::en::DomainSuffix().fake_with_rng(rng),
            (FakeCategory::Word, _) => lorem::en::Word().fake_with_rng(rng),
            (FakeCategory::Sentence, _) => lorem::en::Sentence(3..8).fake_with_rng(rng),
            (FakeCategory::Paragraph, _) => lorem::en::Paragraph(2..4).fake_with_rng(rng),
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fake_with(category: FakeCategory, locale: LocaleKey, rng: &mut ChaCha8Rng) -> Option<String> {
        FakeProvider::fake(&FakeRsProvider, category, locale, rng)
    }

    #[test]
    fn every_category_produces_text() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for category in FakeCategory::ALL {
            let value = fake_with(*category, LocaleKey::EnUs, &mut rng).expect("value");
            assert!(!value.is_empty(), "{category} produced empty text");
        }
    }

    #[test]
    fn email_looks_like_an_address() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let email = fake_with(FakeCategory::Email, LocaleKey::EnUs, &mut rng).expect("email");
        assert!(email.contains('@'));
    }

    #[test]
    fn same_seed_same_value() {
        let mut left = ChaCha8Rng::seed_from_u64(3);
        let mut right = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(
            fake_with(FakeCategory::FullName, LocaleKey::PtBr, &mut left),
            fake_with(FakeCategory::FullName, LocaleKey::PtBr, &mut right)
        );
    }
}
